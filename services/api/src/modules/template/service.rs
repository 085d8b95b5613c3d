use entity::{email_template, email_template_variable};
use regex::{Captures, Regex};
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use std::collections::HashMap;

pub struct RenderedTemplate {
    pub subject: String,
    pub html: String,
    pub template_id: String,
}

/// Resolves `key` as an active template owned by `user_id` (by id first, then
/// slug), substitutes caller-supplied variables, then fills whatever
/// placeholders remain with the template's declared defaults. `None` if no
/// matching active template exists.
pub async fn render(
    db: &DatabaseConnection,
    user_id: &str,
    key: &str,
    variables: &HashMap<String, String>,
) -> Result<Option<RenderedTemplate>, DbErr> {
    let candidates = email_template::Entity::find()
        .filter(email_template::Column::UserId.eq(user_id))
        .filter(email_template::Column::IsActive.eq(true))
        .filter(
            email_template::Column::Id
                .eq(key)
                .or(email_template::Column::Slug.eq(key)),
        )
        .all(db)
        .await?;

    let Some(template) = candidates
        .iter()
        .find(|t| t.id == key)
        .or_else(|| candidates.first())
    else {
        return Ok(None);
    };

    let declared_vars = email_template_variable::Entity::find()
        .filter(email_template_variable::Column::TemplateId.eq(template.id.clone()))
        .all(db)
        .await?;

    let mut subject = template.subject.clone();
    let mut html = template.html_content.clone();

    for (name, value) in variables {
        substitute_placeholder(&mut subject, name, value);
        substitute_placeholder(&mut html, name, value);
    }

    for declared in &declared_vars {
        substitute_placeholder(&mut subject, &declared.name, &declared.default_value);
        substitute_placeholder(&mut html, &declared.name, &declared.default_value);
    }

    Ok(Some(RenderedTemplate {
        subject,
        html,
        template_id: template.id.clone(),
    }))
}

/// Replaces every whitespace-tolerant `{{ name }}` occurrence of `text` with
/// the HTML-escaped `value`. A no-op if the placeholder isn't present.
fn substitute_placeholder(text: &mut String, name: &str, value: &str) {
    let pattern = format!(r"\{{\{{\s*{}\s*\}}\}}", regex::escape(name));
    let Ok(re) = Regex::new(&pattern) else {
        return;
    };

    if !re.is_match(text) {
        return;
    }

    let escaped = html_escape::encode_safe(value).into_owned();
    *text = re
        .replace_all(text, |_: &Captures| escaped.clone())
        .into_owned();
}

#[cfg(test)]
mod tests {
    use super::substitute_placeholder as substitute;

    #[test]
    fn substitutes_whitespace_tolerant_placeholder() {
        let mut subject = String::from("Hello {{  name }}!");
        substitute(&mut subject, "name", "Bob");
        assert_eq!(subject, "Hello Bob!");
    }

    #[test]
    fn escapes_html_in_substituted_value() {
        let mut html = String::from("<p>{{bio}}</p>");
        substitute(&mut html, "bio", "<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn leaves_unknown_placeholders_literal() {
        let mut subject = String::from("Hi {{name}}, your code is {{code}}");
        substitute(&mut subject, "name", "Ann");
        assert_eq!(subject, "Hi Ann, your code is {{code}}");
    }
}
