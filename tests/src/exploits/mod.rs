//! Adversarial suites: every attack the engine must shrug off without
//! losing a unit or wedging the lifecycle.
