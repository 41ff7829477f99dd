/// The fixed extraction instruction, with the user's text embedded verbatim.
/// Names every target field and its normalization rule so the model corrects
/// typos and coerces values into the declared shape.
pub fn build_prompt(text: &str) -> String {
    format!(
        "Extract and normalize the following information from the text and return it as a \
JSON object. If any field is not found in the text, set it to null. Handle any typos or \
variations in the text:

- fullName (string): Extract the person's full name, correcting any spelling mistakes
- age (number): Extract the age as a number, handling any typos in the number
- jobTitle (string): Extract the job title, normalizing common variations and fixing typos
- company (string): Extract the company name, correcting any spelling mistakes
- location (string): Extract the location, normalizing city and country names
- hobbies (array of strings): Extract hobbies as an array, normalizing common variations
- favouriteColor (must be one of: 'green', 'yellow', 'red'): Extract and normalize to one \
of these colors, handling variations like 'favorite', 'fav', etc.
- linkedin (URL): Extract the LinkedIn URL, ensuring it's a valid URL format
- graduationYear (number): Extract the graduation year as a number, handling any typos
- favouriteLanguage (string): Extract the programming language, normalizing common variations

Text to analyze:
{text}

Return ONLY the JSON object, nothing else. Make sure to:
1. Set any missing fields to null
2. Correct any typos in the extracted data
3. Normalize the data to match the expected format
4. Handle variations in how the information is presented"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_text_and_names_every_field() {
        let prompt = build_prompt("John is a 30 year old plumber");
        assert!(prompt.contains("John is a 30 year old plumber"));
        for field in [
            "fullName",
            "age",
            "jobTitle",
            "company",
            "location",
            "hobbies",
            "favouriteColor",
            "linkedin",
            "graduationYear",
            "favouriteLanguage",
        ] {
            assert!(prompt.contains(field), "missing {field}");
        }
    }
}
