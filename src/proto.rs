//! TensorBoard protobuf messages, generated by `build.rs` from
//! `proto/tensorboard.proto`.

include!(concat!(env!("OUT_DIR"), "/protos/mod.rs"));

pub use tensorboard::{
    event, session_log, summary, summary_metadata, DataType, Event, HistogramProto, SessionLog,
    Summary, SummaryMetadata, TensorProto,
};
