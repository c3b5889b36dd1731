mod server;
pub use server::{Catalog, CatalogEntry, new_server, router};

mod tiles;
pub use tiles::get_tile;

mod quantiles;
pub use quantiles::get_quantiles;
