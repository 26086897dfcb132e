//! Prompt construction for the two synthesis calls.
//!
//! Both prompts are fixed templates with worked examples. Placeholders are
//! substituted in a single left-to-right pass, so a question or result that
//! itself contains `{schema}` is inserted literally and never expanded again.

/// Heading that opens the question section of the SQL prompt.
pub const QUERY_SECTION: &str = "your turn :";

/// Heading that opens the question section of the answer prompt.
pub const ANSWER_SECTION: &str = "your turn to write response in natural language";

/// Template for turning a question into a SQL query.
const QUERY_TEMPLATE: &str = "below is the schema of {dialect} database, read the schema carefully about the table and column names. Also take care of table or column name case sensitivity.
Finally answer user's question in the form of SQL query.

{schema}

please only provide the SQL query and nothing else

for example:
question: how many albums we have in database
SQL query: SELECT COUNT(*) FROM album
question: how many customers are from Brazil in the database ?
SQL query: SELECT COUNT(*) FROM customer WHERE country=Brazil

your turn :
question: {question}
SQL query :
please only provide the SQL query and nothing else
";

/// Template for turning a query result into a prose answer.
const ANSWER_TEMPLATE: &str = "below is the schema of {dialect} database, read the schema carefully about the table and column names of each table.
Also look into the conversation if available
Finally write a response in natural language by looking into the conversation and result.

{schema}

Here are some example for you:
question: how many albums we have in database
SQL query: SELECT COUNT(*) FROM album;
Result : [(34,)]
Response: There are 34 albums in the database.

question: how many users we have in database
SQL query: SELECT COUNT(*) FROM customer;
Result : [(59,)]
Response: There are 59 amazing users in the database.

question: how many users above are from india we have in database
SQL query: SELECT COUNT(*) FROM customer WHERE country=india;
Result : [(4,)]
Response: There are 4 amazing users in the database.

your turn to write response in natural language from the given result :
question: {question}
SQL query : {query}
Result : {result}
Response:
";

/// Builds the prompt asking the model for a SQL query.
pub fn render_query_prompt(schema: &str, question: &str, dialect: &str) -> String {
    render(
        QUERY_TEMPLATE,
        &[
            ("dialect", dialect),
            ("schema", schema),
            ("question", question),
        ],
    )
}

/// Builds the prompt asking the model to phrase a query result as an answer.
pub fn render_answer_prompt(
    schema: &str,
    question: &str,
    query: &str,
    result: &str,
    dialect: &str,
) -> String {
    render(
        ANSWER_TEMPLATE,
        &[
            ("dialect", dialect),
            ("schema", schema),
            ("question", question),
            ("query", query),
            ("result", result),
        ],
    )
}

/// Substitutes `{name}` placeholders in one pass over the template.
///
/// Braces that do not form a known placeholder are copied unchanged.
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let substituted = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });

        match substituted {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_query_prompt_contains_question_and_schema() {
        let prompt = render_query_prompt(
            "Table: album\n  - album_id: int",
            "how many albums we have in database",
            "MySQL",
        );

        assert!(prompt.starts_with("below is the schema of MySQL database"));
        assert!(prompt.contains("Table: album\n  - album_id: int"));
        assert!(prompt.contains("your turn :\nquestion: how many albums we have in database\nSQL query :"));
        assert!(prompt.contains("SQL query: SELECT COUNT(*) FROM customer WHERE country=Brazil"));
        assert!(!prompt.contains("{question}"));
    }

    #[test]
    fn test_answer_prompt_contains_result() {
        let prompt = render_answer_prompt(
            "Table: customer",
            "how many users we have in database",
            "SELECT COUNT(*) FROM customer",
            "[(59,)]",
            "PostgreSQL",
        );

        assert!(prompt.starts_with("below is the schema of PostgreSQL database"));
        assert!(prompt.ends_with(
            "question: how many users we have in database\nSQL query : SELECT COUNT(*) FROM customer\nResult : [(59,)]\nResponse:\n"
        ));
        assert!(prompt.contains("Response: There are 59 amazing users in the database."));
    }

    #[test]
    fn test_values_are_not_expanded_twice() {
        let prompt = render_query_prompt("SCHEMA", "what is {schema}?", "MySQL");
        assert!(prompt.contains("question: what is {schema}?"));
        assert_eq!(prompt.matches("SCHEMA").count(), 1);
    }

    #[test]
    fn test_render_leaves_unknown_braces() {
        assert_eq!(
            render("a {x} {y} {", &[("x", "1")]),
            "a 1 {y} {"
        );
        assert_eq!(render("{x}{x}", &[("x", "{x}")]), "{x}{x}");
    }

    #[test]
    fn test_empty_result_renders_blank() {
        let prompt = render_answer_prompt("S", "q", "SELECT 1 WHERE 1=0", "", "MySQL");
        assert!(prompt.contains("Result : \nResponse:\n"));
    }
}
