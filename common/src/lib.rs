//! Outfit AI Common Library
//!
//! CLIと解析パイプラインで共有される、IOを持たない型とロジック

pub mod types;
pub mod error;
pub mod prompts;
pub mod parser;
pub mod search;
pub mod session;

pub use types::{IdentifiedItem, ShoppingSuggestion};
pub use error::{Error, Result};
pub use prompts::{OUTFIT_PROMPT, response_schema};
pub use parser::{strip_code_fence, parse_items_response};
pub use search::{RawSearchItem, SearchResponse, collect_suggestions, retain_complete, provider_error_message};
pub use session::{AnalysisTicket, Applied, Phase, SearchRequest, SearchState, SearchTicket, Session};
