pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_collections.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_collections.sql")),
				"tables/002_bookmarks.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_bookmarks.sql")),
				"tables/003_bookmark_likes.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_bookmark_likes.sql")),
				"tables/004_search_history.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_search_history.sql")),
				"tables/005_user_preferences.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_user_preferences.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
