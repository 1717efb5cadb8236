use serde_json::json;

pub fn playbook_template(modes: &[String]) -> String {
    let mut doc = String::new();
    doc.push_str("# Project Playbook\n\n");
    doc.push_str(
        "This workspace was provisioned by seedbed. Each mode below has a command file\n\
         describing how agents should operate in that mode.\n\n",
    );
    doc.push_str("## Modes\n\n");
    for mode in modes {
        doc.push_str(&format!("- **{mode}**: see `commands/{mode}.md`\n"));
    }
    doc.push_str("\n## State\n\n");
    doc.push_str("- `memory/` holds agent and session state (seeded in `memory/store.json`)\n");
    doc.push_str("- `coordination/` holds orchestration and subtask records\n");
    doc.push_str("- `memory-bank.md` and `coordination.md` describe the conventions for both\n");
    doc.push_str("\n## Running\n\n");
    doc.push_str("Invoke `./seedbed-run <mode> [args]` to enter a mode.\n");
    doc
}

pub fn mode_config_template(modes: &[String]) -> String {
    let entries: Vec<_> = modes
        .iter()
        .map(|mode| {
            json!({
                "name": mode,
                "description": format!("{mode} mode"),
                "command": format!("commands/{mode}.md"),
            })
        })
        .collect();
    let config = json!({
        "version": "1.0.0",
        "modes": entries,
    });
    serde_json::to_string_pretty(&config).unwrap_or_else(|_| String::from("{}"))
}

pub fn command_file_template(mode: &str) -> String {
    format!(
        "# {mode}\n\n\
         Operating instructions for the `{mode}` mode.\n\n\
         ## Goal\n\n\
         Describe the outcome this mode is responsible for.\n\n\
         ## Steps\n\n\
         1. Read the playbook and the current memory state.\n\
         2. Perform the {mode} work.\n\
         3. Record results under `coordination/subtasks/`.\n"
    )
}

pub fn mode_template_file(mode: &str) -> String {
    let template = json!({
        "name": mode,
        "version": "1.0.0",
        "prompt": format!("You are operating in {mode} mode."),
        "outputs": ["coordination/subtasks"],
    });
    serde_json::to_string_pretty(&template).unwrap_or_else(|_| String::from("{}"))
}

pub fn wrapper_script() -> String {
    if cfg!(windows) {
        String::from("@echo off\r\nseedbed run %*\r\n")
    } else {
        String::from("#!/usr/bin/env sh\nexec seedbed run \"$@\"\n")
    }
}

pub fn memory_bank_template() -> String {
    String::from(
        "# Memory Bank\n\n\
         Durable state shared between agent sessions.\n\n\
         ## Layout\n\n\
         - `memory/agents/` — one file per agent, owned by that agent\n\
         - `memory/sessions/` — one file per session transcript summary\n\
         - `memory/store.json` — seed index, updated by the orchestrator\n\n\
         ## Rules\n\n\
         Entries are append-oriented; rewrite only your own files.\n",
    )
}

pub fn coordination_doc_template() -> String {
    String::from(
        "# Coordination\n\n\
         How work is split and handed off in this workspace.\n\n\
         ## Layout\n\n\
         - `coordination/orchestration/` — active plans, one file per plan\n\
         - `coordination/subtasks/` — individual task records with status\n\n\
         ## Handoff\n\n\
         A subtask is claimed by writing an owner field; finished work links\n\
         its results from the plan file.\n",
    )
}

pub fn memory_store_seed() -> String {
    let seed = json!({
        "version": 1,
        "agents": [],
        "sessions": [],
    });
    serde_json::to_string_pretty(&seed).unwrap_or_else(|_| String::from("{}"))
}
