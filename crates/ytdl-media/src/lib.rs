//! Media acquisition for the ytdl backend.
//!
//! Two strategies implement [`FetchStrategy`]: [`YtDlpStrategy`] shells out
//! to yt-dlp (with an ffmpeg remux into mp4 when needed), and
//! [`CobaltStrategy`] talks to a Cobalt-compatible HTTP API. [`MediaFetcher`]
//! runs the primary strategy and falls back to Cobalt when the failure is
//! classified as bot detection.

pub mod cobalt;
pub mod error;
pub mod fetcher;
pub mod progress;
pub mod ytdlp;

pub use cobalt::{CobaltConfig, CobaltStrategy};
pub use error::{FetchError, FetchResult};
pub use fetcher::{is_bot_detection, FetchStrategy, FetchedMedia, MediaFetcher};
pub use progress::{NullSink, ProgressSink};
pub use ytdlp::YtDlpStrategy;
