pub mod exposition_util;
