//! Cross-format tests: the same serde records decoded from feed XML and from
//! JSON must come out equal.
