pub mod fragments;
pub mod page_renderer;
pub mod rss_renderer;
pub mod sitemap_renderer;
