use crate::plan::TimestampPlan;

/// Word range requested for each description
pub const MIN_DESCRIPTION_WORDS: usize = 8;
pub const MAX_DESCRIPTION_WORDS: usize = 15;

/// Render the instruction sent alongside the video
pub fn build_prompt(plan: &TimestampPlan) -> String {
    build_prompt_with_focus(plan, None)
}

/// Same as [`build_prompt`], with an optional hint about what kind of video this is
/// (e.g. "a cooking show" or "a Godot game development stream").
pub fn build_prompt_with_focus(plan: &TimestampPlan, focus: Option<&str>) -> String {
    let timestamp_list = plan
        .iter()
        .map(|ts| format!("- {}", ts))
        .collect::<Vec<_>>()
        .join("\n");

    let focus_line = focus
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(|f| format!("\nContext: this video is {}. Focus on what matters for that kind of content.\n", f))
        .unwrap_or_default();

    format!(
        r#"You are analyzing a specific YouTube video. Look at the actual video content at these EXACT timestamps:
{timestamp_list}
{focus_line}
Focus on what is shown, said, or demonstrated at each specific timestamp.

For each timestamp, provide output in this exact format:
{{
  "timestamp": "HH:MM:SS",
  "description": "{min}-{max} word description with slightly humorous tone"
}}

Keep descriptions between {min}-{max} words. Be witty but accurate about THIS specific video.
Describe what you see on screen.

Return ONLY a JSON array of these objects, nothing else."#,
        timestamp_list = timestamp_list,
        focus_line = focus_line,
        min = MIN_DESCRIPTION_WORDS,
        max = MAX_DESCRIPTION_WORDS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::plan;

    #[test]
    fn test_prompt_lists_every_offset() {
        let plan = plan(30).unwrap();
        let prompt = build_prompt(&plan);

        for offset in plan.iter() {
            assert!(prompt.contains(&format!("- {}", offset)), "missing {}", offset);
        }
        assert!(prompt.contains("\"timestamp\""));
        assert!(prompt.contains("\"description\""));
        assert!(prompt.contains("8-15 words"));
        assert!(prompt.contains("witty"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let plan = plan(20).unwrap();
        assert_eq!(build_prompt(&plan), build_prompt(&plan));
    }

    #[test]
    fn test_focus_hint() {
        let plan = plan(60).unwrap();
        let with_focus = build_prompt_with_focus(&plan, Some("a cooking show"));
        assert!(with_focus.contains("this video is a cooking show"));

        // Blank hints are ignored
        assert_eq!(build_prompt_with_focus(&plan, Some("   ")), build_prompt(&plan));
    }
}
