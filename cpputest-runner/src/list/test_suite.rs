// Copyright (c) The cpputest-explorer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    errors::{DebugSymbolError, TestListParseError},
    list::{NodeRef, TestGroup},
};
use serde::Serialize;

/// Number of lines the derived debug location is moved up, so that hosts
/// point at the `TEST` macro invocation rather than into its body. Cosmetic
/// only; the raw symbol dump points at the generated test shell.
pub const DEBUG_LINE_OFFSET: u32 = 2;

/// The root group representing all tests discovered for one executable.
///
/// Rebuilt wholesale from enumeration output on every update; never patched
/// incrementally. Because node ids are derived from hierarchy position alone,
/// a rebuild reuses the same ids for semantically identical entries.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TestSuite {
    root: TestGroup,
}

impl TestSuite {
    /// Creates an empty suite for the executable with the given name.
    ///
    /// The suite's id and label are both the executable name.
    pub fn new(name: &str) -> Self {
        Self {
            root: TestGroup::new(name, name),
        }
    }

    /// The suite's stable identifier.
    pub fn id(&self) -> &str {
        &self.root.id
    }

    /// The executable name this suite was built for.
    pub fn label(&self) -> &str {
        &self.root.label
    }

    /// The root group owning every discovered node.
    pub fn root(&self) -> &TestGroup {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut TestGroup {
        &mut self.root
    }

    /// Recursively resolves an id anywhere in the suite, the root included.
    pub fn find_node(&self, id: &str) -> Option<NodeRef<'_>> {
        self.root.find_node(id)
    }

    /// Clears the suite and rebuilds it from a textual test enumeration.
    ///
    /// Without location data the input is a single line of space-separated
    /// `Group.Test` tokens. With location data it is newline-separated
    /// `Group.Test.File.Line` records, where `File` may itself contain dots;
    /// blank lines are skipped.
    pub fn update_from_test_list(
        &mut self,
        text: &str,
        has_location: bool,
    ) -> Result<(), TestListParseError> {
        self.root = TestGroup::new(self.root.label.clone(), self.root.id.clone());
        if has_location {
            for record in text.lines().filter(|line| !line.trim().is_empty()) {
                let (group, test, file, line) = parse_location_record(record)?;
                self.group_entry(group)
                    .add_test(test, Some(file.into()), Some(line));
            }
        } else {
            for token in text.split_whitespace() {
                let (group, test) = token
                    .split_once('.')
                    .ok_or_else(|| TestListParseError::new(token, "`Group.Test`"))?;
                self.group_entry(group).add_test(test, None, None);
            }
        }
        Ok(())
    }

    /// Attaches a source location to the given test from a raw symbol dump.
    ///
    /// The first line starting with `/` is treated as a `path:line` record.
    /// A dump without such a line is a caller-visible failure: augmentation
    /// for that test did not happen.
    pub fn add_debug_information(
        &mut self,
        test_id: &str,
        symbol_dump: &str,
    ) -> Result<(), DebugSymbolError> {
        let record = symbol_dump
            .lines()
            .find(|line| line.starts_with('/'))
            .ok_or(DebugSymbolError::LocationNotFound)?;
        let (file, line) = record
            .split_once(':')
            .ok_or_else(|| DebugSymbolError::InvalidLineNumber {
                record: record.to_owned(),
            })?;
        let line: u32 =
            line.trim()
                .parse()
                .map_err(|_| DebugSymbolError::InvalidLineNumber {
                    record: record.to_owned(),
                })?;

        let test = self
            .root
            .test_mut(test_id)
            .ok_or_else(|| DebugSymbolError::TestNotFound {
                id: test_id.to_owned(),
            })?;
        test.file = Some(file.into());
        test.line = Some(line.saturating_sub(DEBUG_LINE_OFFSET));
        Ok(())
    }

    /// Finds the immediate child group with the given label, creating it in
    /// first-seen append order if absent.
    fn group_entry(&mut self, label: &str) -> &mut TestGroup {
        if self.root.group_mut(label).is_none() {
            self.root.add_test_group(label);
        }
        self.root
            .group_mut(label)
            .expect("group was just ensured above")
    }
}

/// Splits a `Group.Test.File.Line` record: group and test are the substrings
/// before the first and second `.`, the line number follows the last `.`, and
/// the file (which may contain dots) is everything in between.
fn parse_location_record(
    record: &str,
) -> Result<(&str, &str, &str, u32), TestListParseError> {
    let expected = "`Group.Test.File.Line`";
    let err = || TestListParseError::new(record, expected);
    let (group, rest) = record.split_once('.').ok_or_else(err)?;
    let (test, rest) = rest.split_once('.').ok_or_else(err)?;
    let (file, line) = rest.rsplit_once('.').ok_or_else(err)?;
    let line: u32 = line.trim().parse().map_err(|_| err())?;
    Ok((group, test, file, line))
}
