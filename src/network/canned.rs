use alloc::{
    string::{String, ToString},
    vec::Vec,
};

use super::{Request, Response, Transport};
use crate::{Error, Result};

/// A [`Transport`] that answers from a fixed list of responses instead of the
/// network, for working on a display layout offline.
///
/// Responses are served in order; the last one repeats. Requested URLs are
/// recorded.
#[derive(Clone, Debug, Default)]
pub struct CannedTransport {
    responses: Vec<Response>,
    served: usize,
    requests: Vec<String>,
}

impl CannedTransport {
    /// Always answer with `response`.
    #[must_use]
    pub fn new(response: Response) -> Self {
        Self::from_responses([response])
    }

    /// Answer with `responses` in order, then keep repeating the last.
    #[must_use]
    pub fn from_responses(responses: impl IntoIterator<Item = Response>) -> Self {
        Self {
            responses: responses.into_iter().collect(),
            served: 0,
            requests: Vec::new(),
        }
    }

    /// Serve the contents of a local file as a JSON reply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the file can't be read.
    #[cfg(feature = "host")]
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let body = std::fs::read(path.as_ref()).map_err(|err| Error::Network {
            message: err.to_string(),
        })?;
        Ok(Self::new(Response::ok("application/json", body)))
    }

    /// URLs requested so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> &[String] {
        &self.requests
    }
}

impl Transport for CannedTransport {
    async fn get(&mut self, request: &Request<'_>) -> Result<Response> {
        warn!("network: using canned data, not the network");
        self.requests.push(request.url.to_string());
        let index = self.served.min(self.responses.len().saturating_sub(1));
        let response = self.responses.get(index).cloned().ok_or_else(|| Error::Network {
            message: "no canned response".to_string(),
        })?;
        self.served += 1;
        Ok(response)
    }
}
