use insight_report::DataPoint;
use serde_json::{json, Value};

/// Instructions sent alongside every statement PDF. The provider's tagging is
/// a first, heuristic pass; the code-level rule table overrides it afterwards.
pub const EXTRACTION_INSTRUCTIONS: &str = r#"
You are reading a bank statement PDF. Pages are usually scanned images, so run
careful OCR before reading the table.

Return every transaction row as one element of a JSON array. For each row:
1. date: the transaction date exactly as printed.
2. detail: the description / details column.
3. type: "withdrawal" for debits, "deposit" for credits.
4. amount: the debit or credit value as a positive number.
5. balance: the running balance after the row, as a number.
6. tag: a category chosen with the rules below.

Tagging rules (case-insensitive; a keyword counts only as a whole word, never
as part of a longer word):
- "subscription", "netflix", "spotify", "dropout", "disney", "OSN" -> "subscription"
- "talabat", "deliveroo", "qclub", "viva", "catering", "cateri", "coffee", "coffe",
  "tea", "sweets", "chocolate", "eater", "african and eastern", "deli", "fnb",
  "rest", "resto", "restauran", "restaurant" -> "food"
- "amazon" -> "amazon"
- "novomed", "NMED" -> "therapy"
- "freshlanida", "carrefour", "spinneys", "spinney", "waitrose", "union coop",
  "lulu", "grandiose", "nesto", "choithram", "choithrams", "al maya", "west zone",
  "day to day", "noon minutes", "instashop", "qclub", "viva", "minimart",
  "hypermarket", "hypermart", "supermarket", "superma", "market", "catering",
  "grocery" -> "grocery"
- "taxi", "CAREEM" -> "taxi"
- "ENOC", "ADNOC", "EMARAT" -> "gas"
- "laundry" -> "laundry"
- "dewa", "dubai electricity", "water", "authority", "empower",
  "district cooling", "etisalat", "e&", "du", "gas", "dubai gas", "emirates gas",
  "smart dubai", "smartdxb", "dubai municipality", "housing fee" -> "amenities"
  ("DU" must stand alone: "DUBAI" is NOT amenities.)
- "MARRIOTT" -> "massage"
- "temu" -> "temu"
- "justlife" -> "cleaner"
- "rent" -> "rent"
- "AE" immediately followed by a run of digits (an IBAN or transfer id) -> "Transfers"
- "PETS" -> "vet"
- "medical", "hospital" -> "hospital"
- anything else: tag is the detail text unchanged.

Formatting:
- amounts are always positive numbers;
- type is exactly "withdrawal" or "deposit";
- balance is always a number.
"#;

/// JSON schema for the extraction response.
pub fn response_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "date": { "type": "STRING" },
                "detail": { "type": "STRING" },
                "type": { "type": "STRING", "enum": ["withdrawal", "deposit"] },
                "amount": { "type": "NUMBER" },
                "balance": { "type": "NUMBER" },
                "tag": { "type": "STRING" }
            },
            "required": ["detail", "type", "amount", "balance", "tag"]
        }
    })
}

/// `"jan.pdf: $120.00, feb.pdf: $80.00"`
pub fn format_data_points(points: &[DataPoint]) -> String {
    points
        .iter()
        .map(|dp| format!("{}: {}", dp.file_name, dp.amount))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn trend_prompt(label: &str, points: &[DataPoint]) -> String {
    format!(
        r#"Spending for the category "{label}" across several bank statements, oldest first:
Data: {data}

Write one very short comment (15 words at most) on the trend or change.
For example:
- "Spending increased significantly in the latest statement."
- "Consistent spending across all periods."
- "Major drop in expenses compared to previous month."
- "Roughly the same with minor fluctuations."

Be concise and direct."#,
        data = format_data_points(points)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use insight_core::Money;

    fn points() -> Vec<DataPoint> {
        vec![
            DataPoint { file_name: "jan.pdf".into(), amount: Money::from_cents(12000) },
            DataPoint { file_name: "feb.pdf".into(), amount: Money::from_cents(8050) },
        ]
    }

    #[test]
    fn data_points_formatted_in_order() {
        assert_eq!(format_data_points(&points()), "jan.pdf: $120.00, feb.pdf: $80.50");
    }

    #[test]
    fn trend_prompt_names_category_and_data() {
        let p = trend_prompt("grocery", &points());
        assert!(p.contains("\"grocery\""));
        assert!(p.contains("jan.pdf: $120.00, feb.pdf: $80.50"));
    }

    #[test]
    fn instructions_list_shared_vendors_under_grocery() {
        let grocery_rule: String = EXTRACTION_INSTRUCTIONS
            .split("\n- ")
            .find(|rule| rule.starts_with("\"freshlanida\""))
            .unwrap()
            .to_string();
        assert!(grocery_rule.trim_end().ends_with("-> \"grocery\""));
        for keyword in ["\"qclub\"", "\"viva\"", "\"catering\""] {
            assert!(grocery_rule.contains(keyword), "{keyword} missing");
        }
    }

    #[test]
    fn schema_requires_core_fields() {
        let schema = response_schema();
        let required: Vec<&str> = schema["items"]["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(required, ["detail", "type", "amount", "balance", "tag"]);
        assert!(schema["items"]["properties"].get("date").is_some());
    }
}
