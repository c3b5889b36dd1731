mod errors;
pub use errors::{PostgresError, PostgresResult};

mod pool;
pub use pool::PostgresPool;

mod query;
pub use query::{DISTRICT_LAYER, TileQuery, build_tile_query};

mod source;
pub use source::DistrictSource;
