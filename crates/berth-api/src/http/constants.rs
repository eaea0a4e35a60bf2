//! Shared HTTP constants (headers, problem URIs).

pub(crate) const HEADER_API_KEY: &str = "x-berth-api-key";
pub(crate) const HEADER_TOTAL_COUNT: &str = "x-total-count";

pub(crate) const PROBLEM_INTERNAL: &str = "https://berth.dev/problems/internal";
pub(crate) const PROBLEM_UNAUTHORIZED: &str = "https://berth.dev/problems/unauthorized";
pub(crate) const PROBLEM_FORBIDDEN: &str = "https://berth.dev/problems/forbidden";
pub(crate) const PROBLEM_BAD_REQUEST: &str = "https://berth.dev/problems/bad-request";
pub(crate) const PROBLEM_CONFLICT: &str = "https://berth.dev/problems/conflict";
pub(crate) const PROBLEM_NOT_FOUND: &str = "https://berth.dev/problems/not-found";

pub(crate) const LABELS_PATH: &str = "/api/labels";
