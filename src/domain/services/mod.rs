/// +----------------------------------------------------------+
/// | MODULES                                                  |
/// +----------+-------+-------+------------------------------+
/// | Exports:                                                 |
/// |   - identity                                             |
/// |   - notifier                                             |
/// |   - registration_engine                                  |
/// |   - render                                               |
/// |   - signup                                               |
/// |   - supervisor                                           |
/// +----------------------------------------------------------+

pub mod identity;
pub mod notifier;
pub mod registration_engine;
pub mod render;
pub mod signup;
pub mod supervisor;
