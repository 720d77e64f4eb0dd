#[cfg(test)]
mod tests {
    use crate::{
        assemble, build_mask, mask_token, ChoiceDefinition, ChoiceGroup, ConsistencyError,
        EngineConfig, LookupError, MaskTable,
    };

    fn group(n: usize) -> ChoiceGroup {
        let defs: Vec<ChoiceDefinition> = (0..n)
            .map(|i| ChoiceDefinition::new(format!("c{i}")))
            .collect();
        ChoiceGroup::build(&defs, true, 0).unwrap()
    }

    #[test]
    fn tokens_follow_display_slots() {
        let g = group(3);
        let layout = assemble(&[], &[2, 0, 1], &[], &[]);
        let m = build_mask(&layout, g.choices(), "mask_");
        assert_eq!(m.tokens(), ["mask_0", "mask_1", "mask_2"]);
        assert_eq!(m.unmask_order(), ["choice_2", "choice_0", "choice_1"]);
        assert_eq!(m.resolve_display("mask_0").unwrap(), "choice_2");
        assert_eq!(m.mask_of("choice_2").unwrap(), "mask_0");
    }

    #[test]
    fn tokens_never_contain_ids_or_names() {
        let defs = vec![
            ChoiceDefinition::new("right").named("correct_answer").correct(),
            ChoiceDefinition::new("wrong").named("distractor"),
        ];
        let g = ChoiceGroup::build(&defs, true, 3).unwrap();
        let m = g.render().mask().unwrap();
        for e in m.entries() {
            assert!(!e.token.contains("correct"));
            assert!(!e.token.contains("distractor"));
            assert!(!e.token.contains("choice_"));
        }
    }

    #[test]
    fn unknown_lookups() {
        let g = group(2);
        let m = g.render().mask().unwrap();
        assert_eq!(
            m.resolve_display("mask_2").unwrap_err(),
            LookupError::UnknownToken {
                token: "mask_2".to_string()
            }
        );
        // An original id is not a token.
        assert!(m.resolve_display("choice_0").is_err());
        assert_eq!(
            m.mask_of("choice_9").unwrap_err(),
            LookupError::UnknownId {
                id: "choice_9".to_string()
            }
        );
    }

    #[test]
    fn reversible_for_every_choice() {
        let g = group(7);
        let m = g.render().mask().unwrap();
        for c in g.choices() {
            let tok = m.mask_of(c.original_id()).unwrap();
            assert_eq!(m.resolve_display(tok).unwrap(), c.original_id());
        }
    }

    #[test]
    fn custom_token_prefix() {
        let mut cfg = EngineConfig::default();
        cfg.masking.token_prefix = "opt-".to_string();
        let defs = vec![ChoiceDefinition::new("a"), ChoiceDefinition::new("b")];
        let g = ChoiceGroup::build_with(&defs, true, 0, &cfg).unwrap();
        assert_eq!(g.token_prefix(), "opt-");
        assert_eq!(g.render().mask().unwrap().tokens(), ["opt-0", "opt-1"]);
        assert_eq!(mask_token("opt-", 12), "opt-12");
    }

    #[test]
    fn verify_detects_stale_table() {
        let g = group(3);
        let layout = assemble(&[], &[0, 1, 2], &[], &[]);
        let m = build_mask(&layout, g.choices(), "mask_");
        assert!(m.verify_against(&layout, g.choices(), "mask_").is_ok());
        let err = m.verify_against(&layout, g.choices(), "opt-").unwrap_err();
        assert!(matches!(err, ConsistencyError::TokenMismatch { slot: 0, .. }));

        let moved = assemble(&[], &[1, 0, 2], &[], &[]);
        let err = m.verify_against(&moved, g.choices(), "mask_").unwrap_err();
        assert!(matches!(err, ConsistencyError::MaskMismatch { slot: 0, .. }));

        let shorter = assemble(&[], &[0, 1], &[], &[]);
        let err = m.verify_against(&shorter, g.choices(), "mask_").unwrap_err();
        assert!(matches!(err, ConsistencyError::LengthMismatch { .. }));
    }

    #[test]
    fn serde_rebuilds_indices() {
        let g = group(4);
        let m = g.render().mask().unwrap();
        let json = serde_json::to_string(m).unwrap();
        let back: MaskTable = serde_json::from_str(&json).unwrap();
        assert_eq!(&back, m);
        assert_eq!(back.resolve_display("mask_3").unwrap(), m.resolve_display("mask_3").unwrap());
    }

    #[test]
    fn serde_rejects_duplicate_tokens() {
        let json = r#"{"entries":[
            {"token":"mask_0","original_id":"choice_0"},
            {"token":"mask_0","original_id":"choice_1"}]}"#;
        assert!(serde_json::from_str::<MaskTable>(json).is_err());
    }
}
