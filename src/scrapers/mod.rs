//! Fetching and parsing of remote feeds and article pages.
//!
//! # Submodules
//!
//! - [`feed`]: turns an RSS 2.0 or Atom document into raw [`feed::FeedEntry`] records
//! - [`content`]: pulls readable paragraph text out of an article page
//! - [`rss`]: the per-source scraper that ties the two together into
//!   [`NewsItem`](crate::models::NewsItem)s
//!
//! Both network paths share one [`CLIENT`] carrying a browser-like user agent
//! and the per-request timeout. Failures never escape these modules: a broken
//! feed becomes zero items and a broken article becomes empty text.

pub mod content;
pub mod feed;
pub mod rss;

use crate::config::HTTP_TIMEOUT;
use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

pub static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ",
            "AppleWebKit/537.36 (KHTML, like Gecko) ",
            "Chrome/120.0.0.0 Safari/537.36"
        ))
        .timeout(HTTP_TIMEOUT)
        .pool_idle_timeout(Duration::from_secs(10))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .expect("failed to build reqwest client")
});

#[cfg(test)]
pub(crate) mod testing {
    use reqwest::Client;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Client that ignores proxy settings from the environment.
    pub fn loopback_client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    /// Serve canned `(path, status, body)` responses on an ephemeral loopback
    /// port and return the base URL. Unknown paths get a 404.
    pub async fn serve(routes: Vec<(&'static str, u16, String)>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let routes = routes.clone();
                tokio::spawn(async move {
                    let mut request = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => request.extend_from_slice(&chunk[..n]),
                        }
                    }

                    let head = String::from_utf8_lossy(&request);
                    let path = head.split_whitespace().nth(1).unwrap_or("/");
                    let (status, body) = routes
                        .iter()
                        .find(|(p, _, _)| *p == path)
                        .map(|(_, status, body)| (*status, body.clone()))
                        .unwrap_or((404, String::new()));

                    let response = format!(
                        "HTTP/1.1 {status} X\r\nContent-Type: text/html; charset=utf-8\r\n\
                         Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        format!("http://{addr}")
    }
}
