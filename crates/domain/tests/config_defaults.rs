use convo_domain::config::{BudgetConfig, Config, ConfigSeverity, PolicyConfig};

#[test]
fn unset_fields_equal_compiled_defaults_after_partial_toml() {
    let partial = "[policy]\nmax_iterations = 5\n";
    let cfg: Config = toml::from_str(partial).expect("parses");
    assert_eq!(cfg.policy.max_iterations, 5);
    assert_eq!(cfg.policy.repeat_window_ms, PolicyConfig::default().repeat_window_ms);
    assert_eq!(cfg.budget.chars_per_token, BudgetConfig::default().chars_per_token);
    assert!(cfg.features.text_strict_grounding);
}

#[test]
fn empty_toml_matches_full_defaults() {
    let cfg: Config = toml::from_str("").expect("parses");
    let defaults = Config::default();
    assert_eq!(cfg.policy.max_iterations, defaults.policy.max_iterations);
    assert_eq!(cfg.lifecycle.idle_timeout_minutes, defaults.lifecycle.idle_timeout_minutes);
}

#[test]
fn validate_flags_zero_iterations() {
    let mut cfg = Config::default();
    cfg.policy.max_iterations = 0;
    let issues = cfg.validate();
    assert!(issues.iter().any(|i| i.field == "policy.max_iterations" && i.severity == ConfigSeverity::Error));
}

#[test]
fn validate_passes_on_defaults() {
    let issues = Config::default().validate();
    let errors: Vec<_> = issues.iter().filter(|i| i.severity == ConfigSeverity::Error).collect();
    assert!(errors.is_empty(), "expected no errors, got: {errors:?}");
}
