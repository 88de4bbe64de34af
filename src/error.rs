use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailtoolsError {
    /// The streaming rewriter rejected the document. This is the only fatal
    /// category; detection passes never error on strange input.
    #[error("html rewriting failed")]
    Rewrite(#[from] lol_html::errors::RewritingError),
    /// The rewriter sink produced bytes that are not valid UTF-8.
    #[error("rewritten html is not valid utf-8")]
    OutputEncoding(#[from] std::string::FromUtf8Error),
}

pub type Result<T> = std::result::Result<T, MailtoolsError>;
