//! Command implementations for canarm

pub mod arms;
pub mod feedback;
pub mod hand;
pub mod motor;
pub mod record;
pub mod sequence;

pub use arms::arms;
pub use feedback::read;
pub use hand::{hand_fingers, hand_profile};
pub use motor::{
    joint_action, set_angle, set_angles, set_gain, set_speed, set_speeds, set_zero, JointAction,
};
pub use record::{finish, record, records};
pub use sequence::{
    delete_sequence, list_merged, list_sequences, merge_sequences, play_merged, play_sequence,
    run_merged, show_sequence,
};
