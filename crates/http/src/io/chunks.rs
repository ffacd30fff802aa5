#[cfg(test)]
use std::collections::VecDeque;

use bytes::Bytes;
use reqwest::Response;

/// The reason a chunk read failed, as reported by the transport.
#[derive(Debug, PartialEq, Eq)]
pub struct Error {
    message: String,
}

impl Error {
    /// Returns the transport failure description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Pulls byte increments off a streaming response body.
///
/// Tests substitute a queue of preset increments for the network.
pub enum Chunks {
    Response(Response),
    #[cfg(test)]
    VecDeque(VecDeque<Bytes>),
}

impl Chunks {
    pub fn from_response(response: Response) -> Self {
        Chunks::Response(response)
    }

    #[cfg(test)]
    pub fn from_vec_deque(vec: VecDeque<Bytes>) -> Self {
        Chunks::VecDeque(vec)
    }

    #[inline]
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>, Error> {
        match self {
            Chunks::Response(response) => match response.chunk().await {
                Ok(chunk) => Ok(chunk),
                Err(err) => Err(Error {
                    message: format!("{err}"),
                }),
            },
            #[cfg(test)]
            Chunks::VecDeque(vec) => Ok(vec.pop_front()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_preset_increments_drain_in_order() {
        let mut chunks = Chunks::from_vec_deque(
            vec![Bytes::from_static(b"a"), Bytes::from_static(b"bc")].into(),
        );
        assert_eq!(
            chunks.next_chunk().await.unwrap(),
            Some(Bytes::from_static(b"a"))
        );
        assert_eq!(
            chunks.next_chunk().await.unwrap(),
            Some(Bytes::from_static(b"bc"))
        );
        assert_eq!(chunks.next_chunk().await.unwrap(), None);
    }
}
