// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    help_request_order, locality_from_address, BoundingBox, Candidate, Coordinates, Donation,
    DonationMatch, DonationRequest, DonationStatus, DonorProfile, DonorType, DonorVerification,
    HelpRequest, HelpSeeker, MatchStatus, MatchUpdate, NewDonation, NewDonationMatch,
    NewDonationRequest, NewDonorProfile, NewHelpRequest, NewHelpSeeker, NewNotification,
    NewVerificationRequest, Notification, ProfileCounts, ProfileKind, ProfileQuery, RequestStatus,
    ScoringRules, SeekerFilter, SeekerType, SeekerVerification, Urgency, VerificationRequest,
    VerificationStatus, VerificationUpdate, VerifierStamp,
};
pub use requests::{
    BulkProfilesRequest, CandidatesParams, CreateDonationRequest, CreateHelpRequest,
    DirectoryParams, DonationListParams, DonorProfileRequest, HelpRequestListParams,
    MatchResponseRequest, ProfileListParams, ProposeMatchRequest, RegisterHelpSeekerRequest,
    RequestDonationBody, ReviewDecisionRequest, SubmitVerificationRequest, UpdateDonationRequest,
    UpdateRequestStatusBody,
};
pub use responses::{
    ActionResponse, BulkOutcome, CandidatesResponse, ErrorResponse, HealthResponse, MatchDetail,
    ProfileListing, SeekerDashboard, VerificationOverview,
};
