/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The exchange could not be established, or the connection was
    /// interrupted.
    Transport,
    /// The backend replied with something the protocol cannot make
    /// sense of.
    Protocol,
    /// Any other errors.
    Other,
}
