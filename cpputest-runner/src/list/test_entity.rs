// Copyright (c) The cpputest-explorer Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use serde::Serialize;

/// Separator between hierarchy levels in node ids.
///
/// Ids are derived purely from the parent id and the node's own label, so a
/// node at the same hierarchy position always gets the same id across
/// rebuilds. Run and debug requests issued against an old tree therefore
/// still resolve after a reload.
pub const ID_SEPARATOR: char = '/';

/// A node in the test tree: either a single test case or a group of nodes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum TestNode {
    /// A single test case.
    Test(TestCase),
    /// A named collection of tests and nested groups.
    Group(TestGroup),
}

impl TestNode {
    /// Returns the node's stable identifier.
    pub fn id(&self) -> &str {
        match self {
            TestNode::Test(test) => &test.id,
            TestNode::Group(group) => &group.id,
        }
    }

    /// Returns the node's display name.
    pub fn label(&self) -> &str {
        match self {
            TestNode::Test(test) => &test.label,
            TestNode::Group(group) => &group.label,
        }
    }
}

/// A borrowed view of a resolved tree node.
#[derive(Copy, Clone, Debug)]
pub enum NodeRef<'a> {
    /// The resolved node is a test case.
    Test(&'a TestCase),
    /// The resolved node is a group.
    Group(&'a TestGroup),
}

/// A single test case, corresponding to one CppUTest `TEST(Group, Name)`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestCase {
    /// Stable identifier: the owning group's id plus the test's name.
    pub id: String,
    /// The bare test name, without the group prefix.
    pub label: String,
    /// The label of the immediate parent group.
    pub group: String,
    /// Source file the test is defined in, when location data is available.
    pub file: Option<Utf8PathBuf>,
    /// Line the test is defined at, when location data is available.
    pub line: Option<u32>,
}

/// A named collection of tests and nested groups, corresponding to a CppUTest
/// `TEST_GROUP`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestGroup {
    /// Stable identifier, derived from the parent id and this group's label.
    pub id: String,
    /// The group's display name.
    pub label: String,
    children: Vec<TestNode>,
}

impl TestGroup {
    /// Creates a new, empty group.
    pub fn new(label: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            children: Vec::new(),
        }
    }

    /// The group's children, in stored order.
    pub fn children(&self) -> &[TestNode] {
        &self.children
    }

    /// Adds a test to the front of this group's children.
    ///
    /// New tests are prepended (most-recent-first), while new groups are
    /// appended; both orderings mirror the discovery order used elsewhere in
    /// the system and are asserted on by consumers.
    pub fn add_test(&mut self, name: &str, file: Option<Utf8PathBuf>, line: Option<u32>) {
        let test = TestCase {
            id: format!("{}{ID_SEPARATOR}{name}", self.id),
            label: name.to_owned(),
            group: self.label.clone(),
            file,
            line,
        };
        self.children.insert(0, TestNode::Test(test));
    }

    /// Appends a child group and returns a mutable reference to it.
    pub fn add_test_group(&mut self, name: &str) -> &mut TestGroup {
        let group = TestGroup::new(name, format!("{}{ID_SEPARATOR}{name}", self.id));
        self.children.push(TestNode::Group(group));
        match self.children.last_mut() {
            Some(TestNode::Group(group)) => group,
            _ => unreachable!("a group was just pushed"),
        }
    }

    /// Returns the immediate child group with the given label, if any.
    pub fn group_mut(&mut self, label: &str) -> Option<&mut TestGroup> {
        self.children.iter_mut().find_map(|child| match child {
            TestNode::Group(group) if group.label == label => Some(group),
            _ => None,
        })
    }

    /// Resolves an id to test cases.
    ///
    /// If `id` equals this group's own id, every descendant test is returned
    /// (bulk selection: selecting a group runs the whole group). Otherwise
    /// only descendant tests whose id matches exactly are returned, as a list
    /// for uniform handling.
    pub fn find_test(&self, id: &str) -> Vec<&TestCase> {
        if self.id == id {
            return self.tests();
        }
        self.tests().into_iter().filter(|t| t.id == id).collect()
    }

    /// All descendant tests, flattened in pre-order.
    pub fn tests(&self) -> Vec<&TestCase> {
        let mut tests = Vec::new();
        self.collect_tests(&mut tests);
        tests
    }

    fn collect_tests<'a>(&'a self, tests: &mut Vec<&'a TestCase>) {
        for child in &self.children {
            match child {
                TestNode::Test(test) => tests.push(test),
                TestNode::Group(group) => group.collect_tests(tests),
            }
        }
    }

    /// Immediate child groups (non-recursive).
    pub fn test_groups(&self) -> impl Iterator<Item = &TestGroup> {
        self.children.iter().filter_map(|child| match child {
            TestNode::Group(group) => Some(group),
            _ => None,
        })
    }

    /// Recursively resolves an id to a node, including this group itself.
    ///
    /// Returns the first match in stored order.
    pub fn find_node(&self, id: &str) -> Option<NodeRef<'_>> {
        if self.id == id {
            return Some(NodeRef::Group(self));
        }
        for child in &self.children {
            match child {
                TestNode::Test(test) if test.id == id => return Some(NodeRef::Test(test)),
                TestNode::Test(_) => {}
                TestNode::Group(group) => {
                    if let Some(found) = group.find_node(id) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }

    /// Recursively resolves an id to a mutable test case.
    pub fn test_mut(&mut self, id: &str) -> Option<&mut TestCase> {
        for child in &mut self.children {
            match child {
                TestNode::Test(test) if test.id == id => return Some(test),
                TestNode::Test(_) => {}
                TestNode::Group(group) => {
                    if let Some(found) = group.test_mut(id) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }
}
