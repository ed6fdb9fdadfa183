use serde_json::json;

use super::step::AgentStep;

#[derive(Debug, Clone)]
pub struct PromptConfig {
    pub system_prompt: String,
    pub button_list: String,
    pub contract: String,
    /// How many of the policy's own recent steps to show the model.
    pub history_limit: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            system_prompt: "You are playing a Pokémon game on a Game Boy Advance. Choose exactly one button to press this turn based on STATE. Prefer small, safe moves.".to_string(),
            button_list: "Allowed buttons:\n- UP, DOWN, LEFT, RIGHT (walk)\n- A (confirm/interact)\n- B (cancel)\n- START (menu), SELECT\n- L, R".to_string(),
            contract: "Return exactly one <press> JSON block and nothing else.\n\nFormat:\n<press>\n{\"button\":\"UP\",\"thought\":\"why this button\"}\n</press>".to_string(),
            history_limit: 8,
        }
    }
}

pub fn build_control_prompt(
    observation: &str,
    recent_steps: &[AgentStep],
    cfg: &PromptConfig,
) -> String {
    let shown = recent_steps.len().min(cfg.history_limit);
    let state = json!({
        "observation": observation,
        "recent_steps": &recent_steps[recent_steps.len() - shown..],
    });

    let state_json = serde_json::to_string_pretty(&state).unwrap_or_else(|_| "{}".to_string());

    format!(
        "{}\n\n[STATE]\n{state_json}\n\n[BUTTONS]\n{}\n\n[CONTRACT]\n{}\n",
        cfg.system_prompt, cfg.button_list, cfg.contract
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_observation_and_sections() {
        let prompt = build_control_prompt("Player at (1, 2)", &[], &PromptConfig::default());
        assert!(prompt.contains("Player at (1, 2)"));
        assert!(prompt.contains("[STATE]"));
        assert!(prompt.contains("[BUTTONS]"));
        assert!(prompt.contains("[CONTRACT]"));
    }

    #[test]
    fn history_is_capped_to_most_recent() {
        let steps: Vec<AgentStep> = (0..20)
            .map(|n| AgentStep {
                observation: format!("obs {n}"),
                thought: String::new(),
                action: "UP".to_string(),
                timestamp: n,
            })
            .collect();
        let cfg = PromptConfig {
            history_limit: 2,
            ..PromptConfig::default()
        };
        let prompt = build_control_prompt("now", &steps, &cfg);
        assert!(prompt.contains("obs 19"));
        assert!(prompt.contains("obs 18"));
        assert!(!prompt.contains("obs 17"));
    }
}
