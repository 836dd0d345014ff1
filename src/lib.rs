pub mod config;
pub mod logger;
pub mod content;
pub mod tag_index;
pub mod view;
pub mod site_builder;
pub mod mail;
pub mod text_utils;
mod test_data;
