pub mod airtable;
pub mod fetcher;
pub mod geocoder;

pub use airtable::AirtableAdapter;
pub use fetcher::ReqwestPageFetcher;
pub use geocoder::NominatimGeocoder;
