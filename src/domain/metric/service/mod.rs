pub mod metric_publisher_service;
