//! Diagnostic formatter
//!
//! Turns a rule failure into the message the migration author sees: a
//! headline, a paragraph explaining the hazard, and remediation examples with
//! the offending table and column names substituted in.
//!
//! Substitutions:
//!
//! | placeholder   | source                         | example       |
//! |---------------|--------------------------------|---------------|
//! | `table`       | operation table, verbatim      | `user_emails` |
//! | `table_title` | [`camelize`] of the table      | `UserEmails`  |
//! | `model`       | [`classify`] of the table      | `UserEmail`   |
//! | `column`      | operation column, verbatim     | `verified`    |
//! | `column_title`| [`camelize`] of the column     | `Verified`    |

use std::collections::BTreeSet;

use crate::inflect::{camelize, classify};
use crate::operation::{Category, DefaultValue, OperationKind};
use crate::rules::RuleId;
use crate::verdict::Diagnostic;

pub fn add_column_default(
    table: &str,
    column: &str,
    column_type: &str,
    default: &DefaultValue,
) -> Diagnostic {
    let table_title = camelize(table);
    let column_title = camelize(column);
    let model = classify(table);

    let hazard = "Adding a column with a default forces the database to rewrite \
every existing row to backfill the new value. The table stays locked for \
the whole rewrite, which on a large or busy table means downtime.";

    let remediation = format!(
        r#"First add the column without a default:

    class Add{column_title}To{table_title} < ActiveRecord::Migration
      def change
        add_column :{table}, :{column}, :{column_type}
      end
    end

Then set the default in a separate migration. This only affects new rows:

    class AddDefault{column_title}To{table_title} < ActiveRecord::Migration
      def change
        change_column_default :{table}, :{column}, {default}
      end
    end

If existing rows need the value, backfill them in batches from a third
migration:

    class Backfill{column_title}On{table_title} < ActiveRecord::Migration
      def up
        {model}.select(:id).find_in_batches do |records|
          {model}.where(id: records).update_all({column}: {default})
        end
      end
    end
"#
    );

    Diagnostic::new(
        RuleId::AddColumn,
        OperationKind::AddColumn,
        table,
        "Adding a column with a default is unsafe!",
        hazard,
        remediation,
    )
}

pub fn add_column_not_null(
    table: &str,
    column: &str,
    column_type: &str,
    default: Option<&DefaultValue>,
) -> Diagnostic {
    let table_title = camelize(table);
    let column_title = camelize(column);
    let model = classify(table);
    let value = match default {
        Some(value) if !value.is_null() => value.to_string(),
        _ => "<value>".to_string(),
    };

    let hazard = "Adding a not nullable column forces the database to scan every \
existing row to validate the constraint while holding a lock on the table. \
Supplying a default does not avoid this: the rows still have to be \
rewritten before the constraint can hold.";

    let remediation = format!(
        r#"First add the column as nullable:

    class Add{column_title}To{table_title} < ActiveRecord::Migration
      def change
        add_column :{table}, :{column}, :{column_type}
      end
    end

Then backfill existing rows in batches from a separate migration:

    class Backfill{column_title}On{table_title} < ActiveRecord::Migration
      def up
        {model}.where({column}: nil).find_in_batches do |records|
          {model}.where(id: records).update_all({column}: {value})
        end
      end
    end

Once every row has a value, add the constraint in its own migration:

    class Change{column_title}NullOn{table_title} < ActiveRecord::Migration
      def change
        change_column_null :{table}, :{column}, false
      end
    end
"#
    );

    Diagnostic::new(
        RuleId::AddColumn,
        OperationKind::AddColumn,
        table,
        "Adding a not nullable column is unsafe!",
        hazard,
        remediation,
    )
}

pub fn remove_column(table: &str, column: &str) -> Diagnostic {
    let table_title = camelize(table);
    let column_title = camelize(column);
    let model = classify(table);

    let hazard = "Removing a column breaks every running instance of the \
application that still reads or writes it. During a rolling deployment the \
old version keeps serving traffic until the rollout finishes, and its \
queries will fail as soon as the column is gone.";

    let remediation = format!(
        r#"First ship a version of the application that no longer uses the column:

    class {model} < ApplicationRecord
      self.ignored_columns += ["{column}"]
    end

Once that version is fully deployed, remove the column in a later migration:

    class Remove{column_title}From{table_title} < ActiveRecord::Migration
      def change
        safety_assured {{ remove_column :{table}, :{column} }}
      end
    end
"#
    );

    Diagnostic::new(
        RuleId::RemoveColumn,
        OperationKind::RemoveColumn,
        table,
        "Removing a column is unsafe!",
        hazard,
        remediation,
    )
}

pub fn rename_column(table: &str, from: &str, to: &str) -> Diagnostic {
    let table_title = camelize(table);
    let from_title = camelize(from);
    let to_title = camelize(to);
    let model = classify(table);

    let hazard = "Renaming a column is the same as adding a new column and removing \
the old one at the same instant. Running instances of the application still \
use the old name and fail until the rollout finishes.";

    let remediation = format!(
        r#"Rename in steps, each shipped separately:

1. Add the new column:

    class Add{to_title}To{table_title} < ActiveRecord::Migration
      def change
        add_column :{table}, :{to}, <type>
      end
    end

2. Ship code that writes to both {from} and {to}.

3. Backfill the new column in batches:

    class Backfill{to_title}On{table_title} < ActiveRecord::Migration
      def up
        {model}.select(:id, :{from}).find_in_batches do |records|
          records.each {{ |record| record.update_column(:{to}, record.{from}) }}
        end
      end
    end

4. Ship code that reads from {to} and ignores {from}:

    class {model} < ApplicationRecord
      self.ignored_columns += ["{from}"]
    end

5. Remove the old column:

    class Remove{from_title}From{table_title} < ActiveRecord::Migration
      def change
        safety_assured {{ remove_column :{table}, :{from} }}
      end
    end
"#
    );

    Diagnostic::new(
        RuleId::RenameColumn,
        OperationKind::RenameColumn,
        table,
        "Renaming a column is unsafe!",
        hazard,
        remediation,
    )
}

/// `:email` for one column, `[:first_name, :last_name]` for several
fn index_columns(columns: &[String]) -> String {
    match columns {
        [single] => format!(":{}", single),
        _ => format!(
            "[{}]",
            columns
                .iter()
                .map(|c| format!(":{}", c))
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn index_migration(table: &str, columns: &[String], unique: bool) -> String {
    let table_title = camelize(table);
    let columns_title = columns
        .iter()
        .map(|c| camelize(c))
        .collect::<Vec<_>>()
        .join("And");
    let unique = if unique { ", unique: true" } else { "" };

    format!(
        r#"    class Index{columns_title}On{table_title} < ActiveRecord::Migration
      disable_ddl_transaction!

      def change
        add_index :{table}, {columns}{unique}, algorithm: :concurrently
      end
    end
"#,
        columns = index_columns(columns),
    )
}

pub fn add_index_non_concurrent(table: &str, columns: &[String], unique: bool) -> Diagnostic {
    let hazard = "Building an index without the concurrent algorithm blocks every \
write to the table until the build completes. On a large table that can \
take minutes.";

    let remediation = format!(
        "Build the index concurrently, outside the DDL transaction, in a \
migration of its own:\n\n{}",
        index_migration(table, columns, unique)
    );

    Diagnostic::new(
        RuleId::AddIndex,
        OperationKind::AddIndex,
        table,
        "Adding a non-concurrent index is unsafe!",
        hazard,
        remediation,
    )
}

pub fn add_index_in_transaction(table: &str, columns: &[String], unique: bool) -> Diagnostic {
    let hazard = "A concurrent index build cannot run inside the atomic DDL \
transaction that wraps the migration. The build either fails outright or \
holds the transaction's locks for its whole duration.";

    let remediation = format!(
        "Disable the DDL transaction for the migration that adds the \
index:\n\n{}",
        index_migration(table, columns, unique)
    );

    Diagnostic::new(
        RuleId::AddIndex,
        OperationKind::AddIndex,
        table,
        "Adding a concurrent index inside a DDL transaction is unsafe!",
        hazard,
        remediation,
    )
}

pub fn mixed_migration(
    kind: OperationKind,
    table: &str,
    seen: &BTreeSet<Category>,
    current: Category,
) -> Diagnostic {
    let table_title = camelize(table);
    let mixed = seen
        .iter()
        .chain(std::iter::once(&current))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let hazard = format!(
        "This migration mixes {mixed} changes. Schema changes, data changes \
and index builds each need different transaction settings, and a failure \
half-way through leaves the database in a state that is hard to retry."
    );

    let remediation = format!(
        r#"Split the work into one migration per kind of change:

    class Change{table_title}Schema < ActiveRecord::Migration
      # schema changes only
    end

    class Backfill{table_title} < ActiveRecord::Migration
      # data changes only
    end

    class Index{table_title} < ActiveRecord::Migration
      disable_ddl_transaction!
      # concurrent index builds only
    end
"#
    );

    Diagnostic::new(
        RuleId::MixedMigration,
        kind,
        table,
        "Mixing data/index/schema changes in the same migration is unsafe!",
        hazard,
        remediation,
    )
}

pub fn ddl_transaction(kind: OperationKind, table: &str) -> Diagnostic {
    let table_title = camelize(table);

    let hazard = format!(
        "The DDL transaction was disabled for a migration that runs {kind}. \
Without the transaction a failure leaves the schema half-changed with \
nothing to roll back to. The transaction should only be disabled for \
migrations that build indexes concurrently."
    );

    let remediation = format!(
        r#"Remove disable_ddl_transaction! from this migration and keep it for
index builds only:

    class Change{table_title} < ActiveRecord::Migration
      def change
        # runs inside the DDL transaction
      end
    end
"#
    );

    Diagnostic::new(
        RuleId::DdlTransaction,
        kind,
        table,
        "Disabling the DDL transaction is unsafe!",
        hazard,
        remediation,
    )
}

/// A rule was handed an operation outside the kinds it inspects
pub fn unchecked_kind(rule: RuleId, kind: OperationKind, table: &str) -> Diagnostic {
    let hazard = format!(
        "The {rule} rule was asked to check {kind}, which it does not inspect. \
The operation was never checked and cannot be assumed safe."
    );

    let remediation = "Evaluate operations through a RuleSet, which only hands each \
rule the kinds it applies to."
        .to_string();

    Diagnostic::new(
        rule,
        kind,
        table,
        "Operation was not checked by a matching rule!",
        hazard,
        remediation,
    )
}

pub fn batch_iteration(table: &str) -> Diagnostic {
    let model = classify(table);
    let record = crate::inflect::singularize(table.rsplit('.').next().unwrap_or(table));

    let hazard = "Iterating an unfiltered relation loads every row into memory \
before the first one is processed. Memory use grows with the table, and the \
migration holds its locks for as long as the loop runs.";

    let remediation = format!(
        r#"Fetch the rows in batches instead:

    {model}.find_each do |{record}|
      # ...
    end

or process whole batches at a time:

    {model}.find_in_batches do |batch|
      # ...
    end
"#
    );

    Diagnostic::new(
        RuleId::BatchIteration,
        OperationKind::RawIteration,
        table,
        "Iterating a relation without batching is unsafe!",
        hazard,
        remediation,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_column_default_substitution() {
        let d = add_column_default("users", "active", "boolean", &DefaultValue::Bool(true));
        let message = d.message();

        assert!(message.contains("default"));
        assert!(message.contains("class AddActiveToUsers < ActiveRecord::Migration"));
        assert!(message.contains("add_column :users, :active, :boolean"));
        assert!(message.contains("change_column_default :users, :active, true"));
        assert!(message.contains("User.where(id: records).update_all(active: true)"));
    }

    #[test]
    fn test_not_null_uses_placeholder_without_default() {
        let d = add_column_not_null("user_accounts", "plan_id", "integer", None);
        let message = d.message();

        assert!(message.contains("not nullable"));
        assert!(message.contains("class AddPlanIdToUserAccounts"));
        assert!(message.contains("UserAccount.where(plan_id: nil)"));
        assert!(message.contains("update_all(plan_id: <value>)"));
        assert!(message.contains("change_column_null :user_accounts, :plan_id, false"));
    }

    #[test]
    fn test_not_null_reuses_default_literal() {
        let text = DefaultValue::Text("free".into());
        let d = add_column_not_null("accounts", "plan", "string", Some(&text));
        assert!(d.message().contains("update_all(plan: \"free\")"));
    }

    #[test]
    fn test_remove_column_ignored_columns() {
        let d = remove_column("line_items", "legacy_sku");
        let message = d.message();

        assert!(message.contains("class LineItem < ApplicationRecord"));
        assert!(message.contains("self.ignored_columns += [\"legacy_sku\"]"));
        assert!(message.contains("class RemoveLegacySkuFromLineItems"));
        assert!(message.contains("safety_assured { remove_column :line_items, :legacy_sku }"));
    }

    #[test]
    fn test_rename_column_steps() {
        let d = rename_column("users", "fname", "first_name");
        let message = d.message();

        assert!(message.contains("class AddFirstNameToUsers"));
        assert!(message.contains("record.update_column(:first_name, record.fname)"));
        assert!(message.contains("class RemoveFnameFromUsers"));
    }

    #[test]
    fn test_index_messages() {
        let columns = vec!["first_name".to_string(), "last_name".to_string()];
        let d = add_index_non_concurrent("users", &columns, true);
        let message = d.message();

        assert!(message.contains("non-concurrent"));
        assert!(message.contains("class IndexFirstNameAndLastNameOnUsers"));
        assert!(message.contains(
            "add_index :users, [:first_name, :last_name], unique: true, algorithm: :concurrently"
        ));

        let d = add_index_in_transaction("users", &["email".to_string()], false);
        assert!(d.message().contains("add_index :users, :email, algorithm: :concurrently"));
        assert!(d.message().contains("disable_ddl_transaction!"));
    }

    #[test]
    fn test_mixed_lists_categories() {
        let seen: BTreeSet<Category> = [Category::Data].into_iter().collect();
        let d = mixed_migration(OperationKind::AddIndex, "users", &seen, Category::Index);
        assert!(d.hazard().contains("mixes data, index changes"));
        assert_eq!(d.kind(), OperationKind::AddIndex);
    }

    #[test]
    fn test_batch_iteration_record_name() {
        let d = batch_iteration("people");
        assert!(d.message().contains("Person.find_each do |person|"));
    }

    #[test]
    fn test_every_template_has_remediation() {
        let diagnostics = vec![
            add_column_default("t", "c", "integer", &DefaultValue::Integer(0)),
            add_column_not_null("t", "c", "integer", None),
            remove_column("t", "c"),
            rename_column("t", "a", "b"),
            add_index_non_concurrent("t", &["c".to_string()], false),
            add_index_in_transaction("t", &["c".to_string()], false),
            mixed_migration(OperationKind::AddColumn, "t", &BTreeSet::new(), Category::Schema),
            ddl_transaction(OperationKind::AddColumn, "t"),
            batch_iteration("t"),
            unchecked_kind(RuleId::AddIndex, OperationKind::AddColumn, "t"),
        ];

        for d in diagnostics {
            assert!(!d.remediation().trim().is_empty(), "{:?}", d.rule());
            assert!(!d.hazard().trim().is_empty(), "{:?}", d.rule());
        }
    }
}
