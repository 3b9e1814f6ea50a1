pub mod csv_writer;
pub mod error_handler;
pub mod frame;
pub mod ingestion;
pub mod router;
pub mod sqlite_writer;
pub mod subscription;
pub mod writer_backend;
#[cfg(feature = "zmq")]
pub mod zmq_client;

pub use frame::{decode_frame, Event, Frame, Sequence, Topic};
pub use ingestion::{run_ingestion, IngestionError, IngestionLoop, IngestionState, IngestionStats};
pub use router::{route_for, Dispatched, Route, TopicRouter};
pub use subscription::{ChannelSubscription, Subscription, SubscriptionError};
pub use writer_backend::{AuditError, AuditLog, AuditRecord};
#[cfg(feature = "zmq")]
pub use zmq_client::ZmqSubscription;
