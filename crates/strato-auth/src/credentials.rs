//  Copyright (c) 2026 Metaform Systems, Inc
//
//  This program and the accompanying materials are made available under the
//  terms of the Apache License, Version 2.0 which is available at
//  https://www.apache.org/licenses/LICENSE-2.0
//
//  SPDX-License-Identifier: Apache-2.0
//
//  Contributors:
//       Metaform Systems, Inc. - initial API and implementation
//

use bon::Builder;

/// Long-lived application credential used to obtain bearer tokens from the
/// identity service, analogous to a client-credentials OAuth grant.
///
/// Supplied at provider configuration time and never mutated afterwards.
#[derive(Builder, Clone)]
#[builder(on(String, into))]
pub struct ApplicationCredential {
    pub id: String,
    pub secret: String,
}

impl std::fmt::Debug for ApplicationCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationCredential")
            .field("id", &self.id)
            .field("secret", &"***")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secret() {
        let credential = ApplicationCredential::builder()
            .id("app-cred-1")
            .secret("very-secret")
            .build();

        let rendered = format!("{:?}", credential);
        assert!(rendered.contains("app-cred-1"));
        assert!(!rendered.contains("very-secret"));
    }
}
