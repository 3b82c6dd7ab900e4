/// Thumbnail URL for an artifact's cosmetic display image, if its type has one.
///
/// The id is rewritten into the wiki's page naming scheme per catalog type.
pub fn display_image_url(id: &str, kind: &str, low_data: bool) -> Option<String> {
    let px = if low_data { 130 } else { 260 };

    let (prefix, name) = match kind.to_ascii_lowercase().as_str() {
        "release" | "snapshot" => (
            "Java_Edition_",
            id.replace('-', "_")
                .replace("pre", "Pre-Release_")
                .replace("rc", "Release_Candidate_")
                .replace("snapshot", "Snapshot"),
        ),
        "old_beta" => ("Beta_", format!("{}_menu", id.strip_prefix('b').unwrap_or(id))),
        "old_alpha" if id.starts_with('i') => {
            ("Infdev_", format!("{}_menu", id.get(4..).unwrap_or_default()))
        }
        "old_alpha" => ("Alpha_v", format!("{}_menu", id.strip_prefix('a').unwrap_or(id))),
        _ => return None,
    };

    Some(format!("https://minecraft.wiki/images/thumb/{prefix}{name}.png/{px}px-.png"))
}
