pub mod client;
pub mod container;
pub mod error;
pub mod live;
pub mod memory;
pub mod query;
pub mod resolver;
pub mod retry;
pub mod transport;

pub use client::ContentClient;
pub use container::{FetchTicket, PageContainer, PageState};
pub use error::{DeliveryError, Result};
pub use live::{EntryChange, LiveUpdates, Subscription};
pub use memory::MemoryTransport;
pub use query::{EntryQuery, PreviewSession};
pub use resolver::{BlogListing, ContentTypeSpec, Resolver};
pub use retry::RetryConfig;
pub use transport::{DeliveryTransport, HttpTransport};
