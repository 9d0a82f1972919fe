//! Industry sales scripts
//!
//! When a caller supplies no script of their own, reply suggestions are
//! grounded on a per-industry script from `industry_scripts/`. Industries
//! without a dedicated script share `general.md`.

/// Directory under the prompts root holding the scripts
pub const SCRIPTS_DIR: &str = "industry_scripts";
pub const GENERAL_SCRIPT: &str = "general.md";
/// Industry assumed when the request carries none
pub const DEFAULT_INDUSTRY: &str = "other";

/// Script file for an industry code
pub fn script_file(industry: &str) -> &'static str {
    match industry {
        "insurance" => "insurance.md",
        "real_estate" => "real_estate.md",
        "b2b" => "b2b.md",
        "telecom" => "telecom.md",
        "finance" => "finance.md",
        _ => GENERAL_SCRIPT,
    }
}

/// Frame a script for injection into the replies prompt
pub fn industry_context(industry: &str, script: &str) -> String {
    format!(
        "## 업종별 영업 스크립트 참고 정보\n\n업종: {}\n\n{}",
        industry, script
    )
}
