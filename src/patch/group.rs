use super::{PatchOp, PatchOperation, Patchable};
use crate::error::{ScimError, ScimResult, ValidationError};
use crate::filter::{ComparisonOperator, parse_filter};
use crate::resource::{Group, GroupMember};

impl Patchable for Group {
    fn apply_operation(&mut self, operation: &PatchOperation) -> ScimResult<()> {
        let path = operation.path.trim();
        match path.to_ascii_lowercase().as_str() {
            "displayname" => self.display_name = operation.string_value()?,
            "externalid" => self.external_id = operation.string_value()?,
            "members" => match operation.op {
                PatchOp::Add => self.add_members(members_value(operation)?),
                PatchOp::Replace => self.members = members_value(operation)?,
                PatchOp::Remove if operation.carries_value() => {
                    for member in members_value(operation)? {
                        self.remove_member(&member.value);
                    }
                }
                PatchOp::Remove => self.members.clear(),
            },
            _ => match member_selector(path) {
                Some(selector) if operation.op == PatchOp::Remove => {
                    let value = selected_member_value(operation, selector)?;
                    self.remove_member(&value);
                }
                _ => return Err(operation.unsupported_path()),
            },
        }
        Ok(())
    }
}

/// Parse and validate the member references an operation carries.
fn members_value(operation: &PatchOperation) -> ScimResult<Vec<GroupMember>> {
    operation
        .list_value::<GroupMember>()?
        .into_iter()
        .map(|member| {
            GroupMember::new(member.value, member.display, member.member_type).map_err(|e| {
                ScimError::from(ValidationError::invalid_patch_value(
                    &operation.path,
                    e.to_string(),
                ))
            })
        })
        .collect()
}

/// The bracketed selector of a `members[...]` path.
fn member_selector(path: &str) -> Option<&str> {
    let prefix = path.get(..8)?;
    if !prefix.eq_ignore_ascii_case("members[") {
        return None;
    }
    path[8..].strip_suffix(']')
}

/// Resolve `value eq "id"` to the member id it selects.
fn selected_member_value(operation: &PatchOperation, selector: &str) -> ScimResult<String> {
    let unsupported = || operation.unsupported_path();

    let conjunctions = parse_filter(selector).map_err(|_| unsupported())?;
    match conjunctions.as_slice() {
        [conjunction] => match conjunction.terms() {
            [term]
                if term.attribute_path.eq_ignore_ascii_case("value")
                    && term.operator == ComparisonOperator::Equals =>
            {
                Ok(term.comparison_value.clone())
            }
            _ => Err(unsupported()),
        },
        _ => Err(unsupported()),
    }
}
