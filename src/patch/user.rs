use super::{PatchOp, PatchOperation, Patchable};
use crate::error::ScimResult;
use crate::resource::{Email, Name, User};

impl Patchable for User {
    fn apply_operation(&mut self, operation: &PatchOperation) -> ScimResult<()> {
        match operation.path.to_ascii_lowercase().as_str() {
            "username" => self.user_name = operation.string_value()?,
            "displayname" => self.display_name = operation.string_value()?,
            "externalid" => self.external_id = operation.string_value()?,
            "nickname" => self.nick_name = operation.string_value()?,
            "title" => self.title = operation.string_value()?,
            "usertype" => self.user_type = operation.string_value()?,
            "preferredlanguage" => self.preferred_language = operation.string_value()?,
            "locale" => self.locale = operation.string_value()?,
            "timezone" => self.timezone = operation.string_value()?,
            "active" => self.active = operation.bool_value()?.unwrap_or_default(),
            "name" => {
                self.name = match operation.op {
                    PatchOp::Remove => None,
                    _ => {
                        let value = operation.required_value()?;
                        let name: Name = serde_json::from_value(value.clone())
                            .map_err(|_| operation.type_error("a name object", value))?;
                        Some(name).filter(|n| !n.is_empty())
                    }
                };
            }
            "name.givenname" => {
                let value = operation.string_value()?;
                self.update_name(|name| name.given_name = value);
            }
            "name.familyname" => {
                let value = operation.string_value()?;
                self.update_name(|name| name.family_name = value);
            }
            "name.formatted" => {
                let value = operation.string_value()?;
                self.update_name(|name| name.formatted = value);
            }
            "emails" => match operation.op {
                PatchOp::Add => {
                    for email in operation.list_value::<Email>()? {
                        if !self.emails.iter().any(|e| e.value == email.value) {
                            self.emails.push(email);
                        }
                    }
                }
                PatchOp::Replace => self.emails = operation.list_value()?,
                PatchOp::Remove if operation.carries_value() => {
                    let listed = operation.list_value::<Email>()?;
                    self.emails
                        .retain(|email| !listed.iter().any(|l| l.value == email.value));
                }
                PatchOp::Remove => self.emails.clear(),
            },
            _ => return Err(operation.unsupported_path()),
        }
        Ok(())
    }
}

impl User {
    /// Edit the name sub-attributes, dropping `name` once nothing is left.
    fn update_name(&mut self, edit: impl FnOnce(&mut Name)) {
        let mut name = self.name.take().unwrap_or_default();
        edit(&mut name);
        self.name = Some(name).filter(|n| !n.is_empty());
    }
}
