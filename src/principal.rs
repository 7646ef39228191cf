// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::BTreeSet;

/// Reserved role held by requests without an authenticated identity.
pub const UNAUTHENTICATED_ROLE: &str = "$unauthenticated";

/// The identity a request is evaluated for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Authenticated { roles: BTreeSet<String> },
    Anonymous,
}

impl Principal {
    pub fn authenticated<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Principal::Authenticated {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Map the transport's authentication outcome to a principal.
    ///
    /// `None` means no identity was authenticated.
    pub fn resolve<I, S>(authenticated_roles: Option<I>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match authenticated_roles {
            Some(roles) => Self::authenticated(roles),
            None => Principal::Anonymous,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Principal::Authenticated { .. })
    }

    /// Roles used for rule lookup.
    pub fn effective_roles(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        match self {
            Principal::Authenticated { roles } => Box::new(roles.iter().map(String::as_str)),
            Principal::Anonymous => Box::new(std::iter::once(UNAUTHENTICATED_ROLE)),
        }
    }
}
