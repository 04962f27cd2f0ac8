/*!
`s3inspect` - find sensitive data in S3 buckets

Lists the objects of an S3-compatible bucket, downloads the ones matching a
key pattern and reports email addresses, phone numbers, card numbers and other
info types found in them.

```no_run
use s3inspect::{build_client, inspect_bucket, ClientSettings, InspectConfig, ScanOptions};

# async fn run() -> s3inspect::Result<()> {
let client = build_client(&ClientSettings::default()).await;
let mut out = std::io::stdout();
inspect_bucket(
    &client,
    "my-bucket",
    "*",
    InspectConfig::default(),
    &ScanOptions::default(),
    &mut out,
)
.await?;
# Ok(())
# }
```
*/

pub mod content;
pub mod detector;
pub mod error;
pub mod info_type;
pub mod inspect;
mod interceptors;
pub mod report;
pub mod storage;

pub use detector::{Finding, InspectConfig, Inspector};
pub use error::{InspectError, Result};
pub use info_type::{InfoType, Likelihood};
pub use inspect::{inspect_bucket, inspect_object, inspect_objects, ScanOptions};
pub use report::{write_report, ObjectReport, OutputFormat};
pub use storage::{build_client, ClientSettings, KeyMatcher};
