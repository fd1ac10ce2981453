/// Trim a fully qualified type path down to the bare type name.
///
/// `"crewline_pipeline::components::GapRankSelector"` becomes
/// `"GapRankSelector"`. Used for default stage names in logs.
pub fn short_type_name(full: &str) -> &str {
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_module_path() {
        assert_eq!(short_type_name("a::b::Widget"), "Widget");
        assert_eq!(short_type_name("Widget"), "Widget");
    }
}
