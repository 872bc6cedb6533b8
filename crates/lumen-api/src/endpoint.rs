// Live-channel address derivation.
//
// The backend serves the event stream from the same origin as the HTTP API.
// A secure origin maps to `wss`, an insecure one to `ws`.

use url::Url;

use crate::error::Error;

/// Path the backend serves the live event stream on.
pub const DEFAULT_LIVE_PATH: &str = "/ws";

/// Derive the WebSocket URL for `path` on the server at `origin`.
///
/// The origin's own path, query and fragment are discarded.
pub fn live_url(origin: &Url, path: &str) -> Result<Url, Error> {
    let scheme = match origin.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => {
            return Err(Error::InvalidOrigin {
                origin: origin.to_string(),
                reason: format!("unsupported scheme '{other}'"),
            });
        }
    };

    if origin.host_str().is_none() {
        return Err(Error::InvalidOrigin {
            origin: origin.to_string(),
            reason: "missing host".into(),
        });
    }

    let mut url = origin.clone();
    url.set_scheme(scheme).map_err(|()| Error::InvalidOrigin {
        origin: origin.to_string(),
        reason: format!("cannot switch scheme to '{scheme}'"),
    })?;
    url.set_path(path);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}
