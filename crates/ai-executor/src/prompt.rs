//! Prompt composition for the per-task agent invocation.

use ai_core::Task;

/// Standing instructions sent with every task.
pub(crate) fn system_prompt() -> String {
    "You are working inside an isolated git worktree that exists only for \
     this task. Modify files directly in the current working directory; do \
     not ask for confirmation and do not touch anything outside it. When \
     the change is complete, commit your work with a descriptive message. \
     Keep the change minimal and focused on the issue at hand."
        .to_string()
}

/// The task description the agent sees.
pub(crate) fn user_prompt(task: &Task) -> String {
    let mut prompt = format!(
        "Resolve issue #{number}: {title}\n",
        number = task.issue_number,
        title = task.title
    );
    if !task.labels.is_empty() {
        prompt.push_str(&format!("Labels: {}\n", task.labels.join(", ")));
    }
    prompt.push('\n');
    if task.body.trim().is_empty() {
        prompt.push_str("(The issue has no description; go by the title.)\n");
    } else {
        prompt.push_str(&task.body);
        prompt.push('\n');
    }
    prompt.push_str(
        "\nImplement the change now, directly in this working directory, \
         and commit it when done.",
    );
    prompt
}
