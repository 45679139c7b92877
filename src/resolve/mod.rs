//! Resolvers turning a `(kind, query)` declaration into a membership set.

pub mod course;
pub mod terms;

use std::collections::BTreeSet;
use std::fmt;

use crate::directory::DirectoryClient;
use crate::error::{Error, Result};
use crate::ports::{Clock, CourseRegistry};

pub use course::{CourseQuery, CourseRegistryResolver};

/// Set of user identifiers. Ordered so that every run walks users identically.
pub type MembershipSet = BTreeSet<String>;

/// The closed set of resolver kinds a declaration may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResolverKind {
    /// Directory filter search.
    Directory,
    /// Course registration API.
    CourseRegistry,
    /// A single literal user.
    StaticUser,
    /// Nobody.
    Empty,
}

impl ResolverKind {
    /// Looks up a kind by its tag. Short tags and long names are both accepted.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "ldap" | "directory" => Some(Self::Directory),
            "daisy" | "course-registry" => Some(Self::CourseRegistry),
            "user" | "static-user" => Some(Self::StaticUser),
            "none" | "empty" => Some(Self::Empty),
            _ => None,
        }
    }

    /// Tag written when this tool generates a declaration.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Directory => "ldap",
            Self::CourseRegistry => "daisy",
            Self::StaticUser => "user",
            Self::Empty => "none",
        }
    }
}

impl fmt::Display for ResolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One validated `(kind, query)` pair from the mapping file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Definition {
    /// Resolver evaluating the query.
    pub kind: ResolverKind,
    /// Opaque query string.
    pub query: String,
}

impl Definition {
    /// Validates a declaration's tag and query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for an unknown tag, an empty static user, or a
    /// course-registry query that is neither `students` nor `course:<id>`.
    pub fn new(tag: &str, query: &str) -> Result<Self> {
        let kind = ResolverKind::from_tag(tag)
            .ok_or_else(|| Error::Config(format!("unknown resolver kind: {tag}")))?;
        match kind {
            ResolverKind::CourseRegistry => {
                CourseQuery::parse(query)?;
            }
            ResolverKind::StaticUser if query.is_empty() => {
                return Err(Error::Config("static user declaration without a user".into()));
            }
            _ => {}
        }
        Ok(Self { kind, query: query.to_string() })
    }
}

impl fmt::Display for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.query)
    }
}

/// Evaluates a query into a membership set.
pub trait Resolver {
    /// Computes the members selected by `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream source cannot answer.
    fn resolve(&self, query: &str) -> Result<MembershipSet>;
}

/// Passes the query to the directory as a filter.
pub struct DirectoryResolver<'a> {
    directory: &'a DirectoryClient<'a>,
}

impl Resolver for DirectoryResolver<'_> {
    fn resolve(&self, query: &str) -> Result<MembershipSet> {
        Ok(self.directory.search(query)?.into_iter().collect())
    }
}

/// The query itself is the only member.
pub struct StaticUserResolver;

impl Resolver for StaticUserResolver {
    fn resolve(&self, query: &str) -> Result<MembershipSet> {
        Ok(MembershipSet::from([query.to_string()]))
    }
}

/// Always empty.
pub struct EmptyResolver;

impl Resolver for EmptyResolver {
    fn resolve(&self, _query: &str) -> Result<MembershipSet> {
        Ok(MembershipSet::new())
    }
}

/// One resolver per kind.
pub struct ResolverRegistry<'a> {
    directory: DirectoryResolver<'a>,
    course_registry: CourseRegistryResolver<'a>,
}

impl<'a> ResolverRegistry<'a> {
    /// Wires every resolver to its source.
    #[must_use]
    pub fn new(
        directory: &'a DirectoryClient<'a>,
        registry: &'a dyn CourseRegistry,
        clock: &'a dyn Clock,
        realm: &str,
    ) -> Self {
        Self {
            directory: DirectoryResolver { directory },
            course_registry: CourseRegistryResolver::new(registry, clock, realm),
        }
    }

    /// Resolver responsible for `kind`.
    #[must_use]
    pub fn resolver(&self, kind: ResolverKind) -> &dyn Resolver {
        match kind {
            ResolverKind::Directory => &self.directory,
            ResolverKind::CourseRegistry => &self.course_registry,
            ResolverKind::StaticUser => &StaticUserResolver,
            ResolverKind::Empty => &EmptyResolver,
        }
    }

    /// Evaluates one definition.
    ///
    /// # Errors
    ///
    /// Propagates the resolver's failure.
    pub fn resolve(&self, definition: &Definition) -> Result<MembershipSet> {
        self.resolver(definition.kind).resolve(&definition.query)
    }

    /// Union of every definition's members.
    ///
    /// # Errors
    ///
    /// Fails on the first definition that cannot be resolved.
    pub fn expected(&self, definitions: &[Definition]) -> Result<MembershipSet> {
        let mut members = MembershipSet::new();
        for definition in definitions {
            members.extend(self.resolve(definition)?);
        }
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{settings, FakeDirectory, FakeRegistry, FixedClock};

    fn set(users: &[&str]) -> MembershipSet {
        users.iter().map(|u| (*u).to_string()).collect()
    }

    #[test]
    fn accepts_short_and_long_tags() {
        assert_eq!(ResolverKind::from_tag("ldap"), Some(ResolverKind::Directory));
        assert_eq!(ResolverKind::from_tag("course-registry"), Some(ResolverKind::CourseRegistry));
        assert_eq!(ResolverKind::from_tag("static-user"), Some(ResolverKind::StaticUser));
        assert_eq!(ResolverKind::from_tag("none"), Some(ResolverKind::Empty));
        assert_eq!(ResolverKind::from_tag("group"), None);
    }

    #[test]
    fn unknown_kind_is_config_error() {
        let err = Definition::new("group", "staff").unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("unknown resolver kind: group"));
    }

    #[test]
    fn course_queries_are_validated_up_front() {
        assert!(Definition::new("daisy", "students").is_ok());
        assert!(Definition::new("daisy", "course:4711").is_ok());
        assert!(Definition::new("daisy", "teachers").unwrap_err().is_config());
        assert!(Definition::new("user", "").unwrap_err().is_config());
    }

    #[test]
    fn definitions_display_with_canonical_tag() {
        let definition = Definition::new("static-user", "alice").unwrap();
        assert_eq!(definition.to_string(), "user:alice");
    }

    #[test]
    fn expected_is_union_of_definitions() {
        let fake = FakeDirectory::default().with("(ou=staff)", &["alice", "bob"]);
        let settings = settings();
        let directory = DirectoryClient::new(&fake, &settings);
        let registry = FakeRegistry::default();
        let clock = FixedClock::ymd(2023, 8, 14);
        let resolvers = ResolverRegistry::new(&directory, &registry, &clock, "EXAMPLE.ORG");

        let definitions = vec![
            Definition::new("ldap", "(ou=staff)").unwrap(),
            Definition::new("user", "bob").unwrap(),
            Definition::new("user", "carol").unwrap(),
            Definition::new("none", "").unwrap(),
        ];
        assert_eq!(resolvers.expected(&definitions).unwrap(), set(&["alice", "bob", "carol"]));
    }

    #[test]
    fn empty_definition_list_resolves_to_empty_set() {
        let fake = FakeDirectory::default();
        let settings = settings();
        let directory = DirectoryClient::new(&fake, &settings);
        let registry = FakeRegistry::default();
        let clock = FixedClock::ymd(2023, 8, 14);
        let resolvers = ResolverRegistry::new(&directory, &registry, &clock, "EXAMPLE.ORG");

        assert!(resolvers.expected(&[]).unwrap().is_empty());
        assert!(resolvers.resolve(&Definition::new("none", "x").unwrap()).unwrap().is_empty());
    }

    #[test]
    fn directory_failure_propagates() {
        let fake = FakeDirectory::default().failing("(ou=staff)", "server down");
        let settings = settings();
        let directory = DirectoryClient::new(&fake, &settings);
        let registry = FakeRegistry::default();
        let clock = FixedClock::ymd(2023, 8, 14);
        let resolvers = ResolverRegistry::new(&directory, &registry, &clock, "EXAMPLE.ORG");

        let err = resolvers.resolve(&Definition::new("ldap", "(ou=staff)").unwrap()).unwrap_err();
        assert!(err.to_string().contains("server down"));
    }
}
