use super::{policy_for, CompletionItem};
use codeintel_engine::CompletionEntry;

/// Sort rank of a completion kind: imports, then data, then callables.
pub fn category(kind: &str) -> u8 {
    match kind {
        "module" | "import" | "namespace" | "package" => 0,
        "attribute" | "variable" | "property" | "field" | "constant" | "member" => 1,
        "function" | "method" | "class" | "constructor" => 2,
        _ => 3,
    }
}

/// Format engine completions for the popup.
///
/// `line` is the current line up to the cursor; on an import line callables
/// get no call placeholder.
pub fn format_completions(
    entries: &[CompletionEntry],
    language: &str,
    line: &str,
    trigger_type: Option<&str>,
) -> Vec<CompletionItem> {
    let policy = policy_for(language);
    let import_line = line.contains("import ");

    let mut sorted: Vec<&CompletionEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| {
        category(&a.kind)
            .cmp(&category(&b.kind))
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.name.cmp(&b.name))
    });

    sorted
        .into_iter()
        .map(|entry| {
            let name = policy.display_name(&entry.kind, &entry.name, trigger_type);
            let label = format!(
                "{}\t〔{}〕",
                entry.description.as_deref().unwrap_or(&name),
                capitalize(&entry.kind)
            );
            let mut insertion = name.replace('$', "\\$");
            if policy.is_callable(&entry.kind) && !import_line {
                insertion.push_str("($0)");
            }
            CompletionItem { label, insertion }
        })
        .collect()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
