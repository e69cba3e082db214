//! Configuration section definitions.
//!
//! Each module corresponds to one or more sections in `acms.toml`:
//!
//! | Module    | TOML Section                       | Purpose                          |
//! |-----------|------------------------------------|----------------------------------|
//! | `store`   | `[store]`                          | Content store location, timeout  |
//! | `sync`    | `[sync]`                           | Debounce, retry, status timing   |
//! | `content` | `[content]` `[mapping]` `[groups]` | Resolver tables, languages       |

mod content;
mod store;
mod sync;

pub use content::{ContentConfig, validate_groups, validate_mapping};
pub use store::StoreConfig;
pub use sync::SyncConfig;
