use crate::{
    core::graph::{CompiledGraph, StateGraph},
    error::ShelfError,
};
use serde::{Deserialize, Serialize};

/// State passed through the greeting graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub name: String,
    pub age: u32,
    pub skills: Vec<String>,
    pub result: String,
}

impl AgentState {
    pub fn new(name: &str, age: u32, skills: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            age,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            result: String::new(),
        }
    }
}

fn personalize_name(mut state: AgentState) -> AgentState {
    state.result = format!("Welcome {}!. ", state.name);
    state
}

fn user_age(mut state: AgentState) -> AgentState {
    state.result.push_str(&format!("You are {} years old.", state.age));
    state
}

fn user_skill(mut state: AgentState) -> AgentState {
    state.result.push_str(&format!(
        " You have the following skills {}",
        state.skills.join(", ")
    ));
    state
}

/// Build the graph greeting a user with their name, age and skills.
pub fn greeting_graph() -> Result<CompiledGraph<AgentState>, ShelfError> {
    let mut graph = StateGraph::new();

    graph
        .add_node("personalize_name", personalize_name)
        .add_node("user_age", user_age)
        .add_node("user_skill", user_skill)
        .add_edge("personalize_name", "user_age")
        .add_edge("user_age", "user_skill")
        .set_entry_point("personalize_name")
        .set_finish_point("user_skill");

    graph.compile()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greets_user() {
        let graph = greeting_graph().unwrap();
        let state = graph.invoke(AgentState::new("Charles", 23, &["python", "JavaScript"]));

        assert_eq!(
            "Welcome Charles!. You are 23 years old. You have the following skills python, JavaScript",
            state.result
        );
        assert_eq!("Charles", state.name);
        assert_eq!(23, state.age);
    }

    #[test]
    fn result_is_overwritten() {
        let graph = greeting_graph().unwrap();
        let mut state = AgentState::new("Ana", 30, &[]);
        state.result = "stale".to_string();

        let state = graph.invoke(state);

        assert_eq!(
            "Welcome Ana!. You are 30 years old. You have the following skills ",
            state.result
        );
    }

    #[test]
    fn runs_in_order() {
        let graph = greeting_graph().unwrap();
        assert_eq!(
            vec!["personalize_name", "user_age", "user_skill"],
            graph.path().collect::<Vec<_>>()
        );
    }
}
