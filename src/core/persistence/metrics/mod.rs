pub mod metric_file_fs_adapter;
pub mod metric_sink_trait;
