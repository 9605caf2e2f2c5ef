use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use ndarray::{Array3, Axis};

use crate::core::error::{Error, Result};

/// Domain tag given to every sample at transform time
pub const TARGET_DOMAIN: &str = "target_domain";

/// Label given to every sample at transform time, where true labels are unknown
pub const PLACEHOLDER_LABEL: &str = "0";

/// Separator between domain and label in the encoded form
pub const SEPARATOR: char = '/';

/// Per-sample key pairing a domain tag with a class label
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomainLabel {
    pub domain: String,
    pub label: String,
}

impl DomainLabel {
    pub fn new(domain: impl Into<String>, label: impl Into<String>) -> Self {
        DomainLabel {
            domain: domain.into(),
            label: label.into(),
        }
    }
}

impl fmt::Display for DomainLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.domain, SEPARATOR, self.label)
    }
}

/// Splits at the first separator; labels may contain it, domains may not
impl FromStr for DomainLabel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once(SEPARATOR) {
            Some((domain, label)) => Ok(DomainLabel::new(domain, label)),
            None => Err(Error::InvalidParameter(format!(
                "'{}' is not of the form domain{}label",
                s, SEPARATOR
            ))),
        }
    }
}

/// Pair each sample's domain tag with its label
///
/// `x` only provides the sample count; `y` and `domains` must match it.
pub fn encode_domains<L, D>(x: &Array3<f64>, y: &[L], domains: &[D]) -> Result<Vec<DomainLabel>>
where
    L: ToString,
    D: ToString,
{
    let n_matrices = x.len_of(Axis(0));
    if y.len() != n_matrices {
        return Err(Error::LengthMismatch {
            what: "labels",
            expected: n_matrices,
            got: y.len(),
        });
    }
    if domains.len() != n_matrices {
        return Err(Error::LengthMismatch {
            what: "domains",
            expected: n_matrices,
            got: domains.len(),
        });
    }

    domains
        .iter()
        .zip(y)
        .map(|(domain, label)| {
            let domain = domain.to_string();
            if domain.contains(SEPARATOR) {
                return Err(Error::InvalidParameter(format!(
                    "domain '{}' contains the separator '{}'",
                    domain, SEPARATOR
                )));
            }
            Ok(DomainLabel::new(domain, label.to_string()))
        })
        .collect()
}

/// Encode every sample of `x` as the unseen target domain with placeholder labels
pub fn encode_target_domain(x: &Array3<f64>) -> Result<Vec<DomainLabel>> {
    let n_matrices = x.len_of(Axis(0));
    encode_domains(
        x,
        &vec![PLACEHOLDER_LABEL; n_matrices],
        &vec![TARGET_DOMAIN; n_matrices],
    )
}

/// Split keys back into (labels, domains)
pub fn decode_domains(keys: &[DomainLabel]) -> (Vec<String>, Vec<String>) {
    keys.iter()
        .map(|key| (key.label.clone(), key.domain.clone()))
        .unzip()
}

/// Sample indices of each domain, in domain order
pub fn group_by_domain(keys: &[DomainLabel]) -> BTreeMap<String, Vec<usize>> {
    let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, key) in keys.iter().enumerate() {
        groups.entry(key.domain.clone()).or_default().push(i);
    }
    groups
}
