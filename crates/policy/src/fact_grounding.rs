/// When a tool-required intent has no successful tool result, retrieved
/// examples (email pipeline, §4.J) may influence style only, never facts.
/// Returns the instruction to splice into the system prompt, or `None` when
/// grounding is already satisfied.
pub fn fact_grounding_directive(tool_required: bool, has_ok_result: bool) -> Option<&'static str> {
    if tool_required && !has_ok_result {
        Some(
            "No tool has returned a confirmed result yet. Any retrieved examples may inform \
             tone and phrasing only — never state a fact (status, amount, date) that isn't in \
             a successful tool result.",
        )
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_present_when_ungrounded() {
        assert!(fact_grounding_directive(true, false).is_some());
    }

    #[test]
    fn directive_absent_when_grounded_or_not_required() {
        assert!(fact_grounding_directive(true, true).is_none());
        assert!(fact_grounding_directive(false, false).is_none());
    }
}
