pub mod email_extractor;
pub mod fetcher;
pub mod form_classifier;
pub mod parser;
pub mod sitemap;

// Re-export the main types for easy importing
pub use fetcher::Fetcher;
pub use parser::SiteParser;
pub use sitemap::SitemapResolver;
